use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    catalog::ProductKind,
    dto::{
        cart::{AddToCartRequest, CartWithItems, UpdateCartItemRequest},
        orders::{CreateOrderRequest, NewOrderItem, OrderList, OrderWithItems, UpdateOrderRequest},
    },
    models::{Cart, CartItem, Order, OrderItem},
    order_status::OrderStatus,
    payment::PaymentLineItem,
    response::{ApiResponse, Meta},
    routes::{cart, health, orders, params},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        cart::get_or_create_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_cart_item,
        cart::clear_cart,
        cart::checkout_cart,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        orders::add_order_item,
        orders::remove_order_item,
        orders::pay_order
    ),
    components(
        schemas(
            Cart,
            CartItem,
            Order,
            OrderItem,
            OrderStatus,
            ProductKind,
            PaymentLineItem,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartWithItems,
            CreateOrderRequest,
            NewOrderItem,
            UpdateOrderRequest,
            OrderWithItems,
            OrderList,
            params::Pagination,
            params::OrderListQuery,
            params::CartLookupQuery,
            Meta,
            ApiResponse<CartWithItems>,
            ApiResponse<CartItem>,
            ApiResponse<OrderItem>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order and payment endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
