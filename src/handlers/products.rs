use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{MessageResponse, NewProduct, ProductFilter, ProductPatch, ProductQuery};
use crate::state::AppState;

fn product_not_found() -> ApiError {
    ApiError::NotFound("Product not found".to_string())
}

/// Public catalogue listing; no identity required.
pub async fn list_products(state: web::Data<AppState>, query: web::Query<ProductQuery>) -> ApiResult<HttpResponse> {
    let filter = ProductFilter::try_from(query.into_inner())?;
    let products = state.products.list(&filter).await?;
    Ok(HttpResponse::Ok().json(products))
}

pub async fn create_product(
    state: web::Data<AppState>,
    user: AuthUser,
    input: web::Json<NewProduct>,
) -> ApiResult<HttpResponse> {
    let input = input.into_inner().normalized();
    input.validate()?;

    let product = state.products.create(input).await?;
    log::info!("user {} created product {}", user.id, product.id);
    Ok(HttpResponse::Created().json(product))
}

pub async fn update_product(
    state: web::Data<AppState>,
    _user: AuthUser,
    id: web::Path<String>,
    patch: web::Json<ProductPatch>,
) -> ApiResult<HttpResponse> {
    let patch = patch.into_inner().normalized();
    patch.validate()?;

    match state.products.update(&id, patch).await? {
        Some(product) => Ok(HttpResponse::Ok().json(product)),
        None => Err(product_not_found()),
    }
}

pub async fn delete_product(
    state: web::Data<AppState>,
    _user: AuthUser,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    if state.products.delete(&id).await? {
        Ok(HttpResponse::Ok().json(MessageResponse::new("Product removed")))
    } else {
        Err(product_not_found())
    }
}
