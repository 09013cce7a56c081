use serde::Deserialize;

#[derive(Deserialize)]
pub struct LoginRequests {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}
