use crate::{error::ApiError, model::role::Role, model::team::Team};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// Caller identity, put into request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| ApiError::Unauthorized("Missing token".into())),
        )
    }
}

impl AuthUser {
    pub fn is_hr_or_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Hr)
    }

    pub fn require_hr_or_admin(&self) -> Result<(), ApiError> {
        if self.is_hr_or_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("HR/Admin only".into()))
        }
    }

    /// HR and admins see every team; a manager only the team they manage.
    pub fn can_view_team(&self, team: &Team) -> bool {
        self.is_hr_or_admin()
            || (self.role == Role::Manager && team.manager_id == Some(self.user_id))
    }

    pub fn require_team_access(&self, team: &Team) -> Result<(), ApiError> {
        if self.can_view_team(team) {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Not allowed to view this team".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(user_id: u64, role: Role) -> AuthUser {
        AuthUser { user_id, role }
    }

    fn team(manager_id: Option<u64>) -> Team {
        Team {
            id: 1,
            name: "Support".into(),
            manager_id,
        }
    }

    #[test]
    fn hr_and_admin_see_every_team() {
        assert!(user(1, Role::Hr).can_view_team(&team(None)));
        assert!(user(1, Role::Admin).can_view_team(&team(Some(9))));
    }

    #[test]
    fn manager_sees_only_own_team() {
        assert!(user(9, Role::Manager).can_view_team(&team(Some(9))));
        assert!(!user(8, Role::Manager).can_view_team(&team(Some(9))));
    }

    #[actix_web::test]
    async fn extractor_reads_request_extensions() {
        let req = actix_web::test::TestRequest::default().to_http_request();
        assert!(AuthUser::extract(&req).await.is_err());

        req.extensions_mut().insert(user(4, Role::Hr));
        let auth = AuthUser::extract(&req).await.unwrap();
        assert_eq!(auth.user_id, 4);
        assert_eq!(auth.role, Role::Hr);
    }

    #[test]
    fn employee_never_sees_team() {
        let employee = user(9, Role::Employee);
        assert!(!employee.can_view_team(&team(Some(9))));
        assert!(employee.require_hr_or_admin().is_err());
    }
}
