use axum::response::Html;

const USER_PAGE: &str = include_str!("../templates/user.html");
const ADMIN_PAGE: &str = include_str!("../templates/admin.html");
const LOGIN_PAGE: &str = include_str!("../templates/login.html");

// GET / and /user.html
pub async fn user_page() -> Html<&'static str> {
    tracing::info!("serving user page");
    Html(USER_PAGE)
}

// GET /admin
pub async fn admin_page() -> Html<&'static str> {
    tracing::info!("serving admin page");
    Html(ADMIN_PAGE)
}

// GET /login
pub async fn login_page() -> Html<&'static str> {
    tracing::info!("serving login page");
    Html(LOGIN_PAGE)
}
