/// Team member as listed on team dashboards.
#[derive(Debug, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub username: String,
}
