//! Order intake and read handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ApiError;
use super::state::AppState;
use crate::domain::{NewOrderItem, Order, OrderItem, OrderStatus};

/// One line item in an intake request.
#[derive(Debug, Deserialize)]
pub struct OrderItemCreate {
    /// Referenced product.
    pub product_id: Uuid,
    /// Units ordered; must be positive.
    pub quantity: i32,
    /// Unit price; must be positive.
    pub price: Decimal,
}

/// Intake request body.
#[derive(Debug, Deserialize)]
pub struct OrderCreate {
    /// Customer placing the order.
    pub customer_id: Uuid,
    /// Line items; may be empty.
    pub items: Vec<OrderItemCreate>,
}

/// One line item in a response.
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    /// Line item id.
    pub id: Uuid,
    /// Referenced product.
    pub product_id: Uuid,
    /// Units ordered.
    pub quantity: i32,
    /// Unit price at order time.
    pub price: Decimal,
}

/// Full order representation returned by both endpoints.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    /// Order id.
    pub order_id: Uuid,
    /// Customer who placed the order.
    pub customer_id: Uuid,
    /// Lifecycle status, `NEW` or `PROCESSED`.
    pub status: OrderStatus,
    /// Sum of `quantity * price` over the items.
    pub total_price: Decimal,
    /// Line items.
    pub items: Vec<OrderItemResponse>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.id,
            customer_id: order.customer_id,
            status: order.status,
            total_price: order.total_price,
            items: order.items.into_iter().map(Into::into).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Largest unit price the `NUMERIC(10,2)` column can hold: 99999999.99.
const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

fn validate(request: &OrderCreate) -> Result<(), ApiError> {
    for item in &request.items {
        if item.quantity <= 0 {
            return Err(ApiError::validation(format!(
                "quantity must be positive, got {}",
                item.quantity
            )));
        }
        if item.price <= Decimal::ZERO {
            return Err(ApiError::validation(format!(
                "price must be positive, got {}",
                item.price
            )));
        }
        if item.price.normalize().scale() > 2 {
            return Err(ApiError::validation(format!(
                "price must have at most two decimal places, got {}",
                item.price
            )));
        }
        if item.price > MAX_UNIT_PRICE {
            return Err(ApiError::validation(format!(
                "price must not exceed {MAX_UNIT_PRICE}, got {}",
                item.price
            )));
        }
    }
    Ok(())
}

/// `POST /orders`: validate, commit, publish, respond 201.
///
/// The response is 201 as soon as the order is durable; a failed publish is
/// logged and counted but never turns a committed order into a client error.
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<OrderCreate>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    validate(&request)?;

    let items = request
        .items
        .into_iter()
        .map(|item| NewOrderItem {
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
        })
        .collect();

    let placed = state.service.place_order(request.customer_id, items).await?;
    Ok((StatusCode::CREATED, Json(placed.order.into())))
}

/// `GET /orders/{id}`: fetch one order or 404.
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .service
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;
    Ok(Json(order.into()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request_with(quantity: i32, price: Decimal) -> OrderCreate {
        OrderCreate {
            customer_id: Uuid::new_v4(),
            items: vec![OrderItemCreate {
                product_id: Uuid::new_v4(),
                quantity,
                price,
            }],
        }
    }

    #[test]
    fn accepts_positive_items() {
        assert!(validate(&request_with(2, Decimal::new(1999, 2))).is_ok());
    }

    #[test]
    fn rejects_zero_quantity() {
        assert!(validate(&request_with(0, Decimal::new(1999, 2))).is_err());
    }

    #[test]
    fn rejects_negative_quantity() {
        assert!(validate(&request_with(-1, Decimal::new(1999, 2))).is_err());
    }

    #[test]
    fn rejects_zero_price() {
        assert!(validate(&request_with(1, Decimal::ZERO)).is_err());
    }

    #[test]
    fn rejects_price_above_column_bound() {
        assert!(validate(&request_with(1, Decimal::MAX)).is_err());
        assert!(validate(&request_with(1, "100000000.00".parse().unwrap())).is_err());
    }

    #[test]
    fn accepts_price_at_column_bound() {
        assert!(validate(&request_with(1, "99999999.99".parse().unwrap())).is_ok());
    }

    #[test]
    fn rejects_sub_cent_precision() {
        assert!(validate(&request_with(1, "10.005".parse().unwrap())).is_err());
    }

    #[test]
    fn accepts_trailing_zero_scale() {
        assert!(validate(&request_with(1, "10.0000".parse().unwrap())).is_ok());
    }

    #[test]
    fn accepts_empty_item_list() {
        let request = OrderCreate {
            customer_id: Uuid::new_v4(),
            items: vec![],
        };
        assert!(validate(&request).is_ok());
    }
}
