//! OpenAPI document served through Swagger UI.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    admin_handler, auth_handler, cart_handler, product_handler, user_handler,
};
use crate::domain::{
    Address, AdminOrderResponse, Category, CategoryRef, CategoryRevenue, CategoryWithCount,
    OrderItemResponse, OrderResponse, OrderStatus, Product, ProductImage, ProductSummary,
    SalesAnalytics, UserProfile, UserResponse, UserRole, UserSummary,
};
use crate::services::TokenResponse;
use crate::types::{MessageResponse, PaginatedAdminOrders, PaginationMeta};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shop API",
        version = "0.1.0",
        description = "E-commerce backend: accounts, catalog, cart, checkout and back office",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:3000", description = "Local development server")),
    paths(
        auth_handler::signup,
        auth_handler::signin,
        user_handler::update_profile,
        user_handler::get_user,
        user_handler::list_addresses,
        user_handler::add_address,
        user_handler::update_address,
        user_handler::delete_address,
        cart_handler::get_cart,
        cart_handler::add_to_cart,
        cart_handler::remove_from_cart,
        cart_handler::place_order,
        cart_handler::order_history,
        product_handler::list_products,
        product_handler::all_products,
        product_handler::search_products,
        product_handler::get_product,
        admin_handler::all_products,
        admin_handler::create_product,
        admin_handler::update_product,
        admin_handler::delete_product,
        admin_handler::list_categories,
        admin_handler::create_category,
        admin_handler::update_category,
        admin_handler::delete_category,
        admin_handler::list_orders,
        admin_handler::get_order,
        admin_handler::update_order_status,
        admin_handler::analytics,
    ),
    components(
        schemas(
            UserRole,
            UserResponse,
            UserSummary,
            UserProfile,
            Address,
            Category,
            CategoryRef,
            CategoryWithCount,
            Product,
            ProductImage,
            ProductSummary,
            OrderStatus,
            OrderItemResponse,
            OrderResponse,
            AdminOrderResponse,
            CategoryRevenue,
            SalesAnalytics,
            TokenResponse,
            MessageResponse,
            PaginationMeta,
            PaginatedAdminOrders,
            auth_handler::SignupRequest,
            auth_handler::SigninRequest,
            user_handler::UpdateProfileRequest,
            user_handler::AddressRequest,
            user_handler::UpdateAddressRequest,
            cart_handler::AddToCartRequest,
            cart_handler::PlaceOrderRequest,
            admin_handler::ProductRequest,
            admin_handler::UpdateProductRequest,
            admin_handler::DeleteProductRequest,
            admin_handler::CategoryRequest,
            admin_handler::UpdateStatusRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Signup and signin"),
        (name = "Users", description = "Profiles"),
        (name = "Addresses", description = "Shipping address book"),
        (name = "Products", description = "Catalog browsing"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Admin", description = "Catalog management, orders and analytics")
    )
)]
pub struct ApiDoc;

/// Registers the JWT bearer scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /api/v1/user/signin"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_cart_and_admin_paths() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/v1/user/cart/add-to-cart"));
        assert!(doc.paths.paths.contains_key("/api/v1/admin/orders/update/{id}"));
        assert!(doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }
}
