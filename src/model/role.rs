use strum_macros::Display;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Manager = 3,
    Employee = 4,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Manager),
            4 => Some(Role::Employee),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_ids() {
        assert_eq!(Role::from_id(1), Some(Role::Admin));
        assert_eq!(Role::from_id(3), Some(Role::Manager));
        assert_eq!(Role::from_id(9), None);
        assert_eq!(Role::Hr.to_string(), "hr");
    }
}
