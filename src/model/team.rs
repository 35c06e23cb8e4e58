use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: u64,
    pub name: String,
    pub manager_id: Option<u64>,
}
