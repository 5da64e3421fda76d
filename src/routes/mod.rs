pub mod api_routes;
pub mod ws_routes;
