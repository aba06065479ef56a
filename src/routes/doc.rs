use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest},
        cart::{AddToCartRequest, CartLine, CartView, UpdateCartItemRequest},
        delivery::{AddCommentRequest, StatusChange},
        orders::{OrderLineRequest, OrderList, PlaceOrderRequest, UpdateOrderStatusRequest},
        pizzas::{CreatePizzaRequest, PizzaList, UpdatePizzaRequest},
    },
    entity::sea_orm_active_enums::{OrderStatus, Role},
    models::{CartItem, DeliveryComment, Order, OrderItem, Pizza, User},
    response::{ApiResponse, Meta},
    routes::{admin, customer, delivery, health, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::signup,
        users::login,
        users::me,
        users::update_me,
        users::deactivate_me,
        admin::create_pizza,
        admin::update_pizza,
        admin::delete_pizza,
        admin::update_order_status,
        customer::list_pizzas,
        customer::view_cart,
        customer::add_to_cart,
        customer::update_cart_item,
        customer::remove_cart_item,
        customer::place_order,
        customer::list_orders,
        delivery::update_delivery_status,
        delivery::add_comment
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            User,
            Pizza,
            CartItem,
            Order,
            OrderItem,
            DeliveryComment,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            CreatePizzaRequest,
            UpdatePizzaRequest,
            PizzaList,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartView,
            CartLine,
            OrderLineRequest,
            PlaceOrderRequest,
            UpdateOrderStatusRequest,
            OrderList,
            AddCommentRequest,
            StatusChange,
            health::HealthData,
            Meta,
            ApiResponse<Pizza>,
            ApiResponse<PizzaList>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<CartView>,
            ApiResponse<StatusChange>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Users", description = "Registration, login and profile endpoints"),
        (name = "Admin", description = "Catalog and order administration"),
        (name = "Customer", description = "Menu, cart and order endpoints"),
        (name = "Delivery", description = "Delivery status and comments"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
