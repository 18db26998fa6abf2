use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorInternalServerError, ErrorNotFound, ErrorUnauthorized},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Client;

use crate::db::mongo::{DB_NAME, USERS};
use crate::middleware::auth::Claims;
use crate::models::user::{User, UserRole};

/// Role gate. Requires `AuthMiddleware` to have run first; the role itself
/// is always re-read from storage, never taken from the token.
pub struct RequireRole {
    required_role: UserRole,
}

impl RequireRole {
    pub fn new(role: UserRole) -> Self {
        RequireRole {
            required_role: role,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequireRoleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service: Rc::new(service),
            required_role: self.required_role,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: Rc<S>,
    required_role: UserRole,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_role = self.required_role;

        let claims = req.extensions().get::<Claims>().cloned();
        let client = req.app_data::<web::Data<Arc<Client>>>().cloned();

        Box::pin(async move {
            let claims = match claims {
                Some(claims) => claims,
                None => return Err(ErrorUnauthorized("User not authenticated")),
            };
            let client = match client {
                Some(client) => client,
                None => return Err(ErrorInternalServerError("Database handle missing")),
            };

            let user_id = ObjectId::parse_str(&claims.user_id)
                .map_err(|_| ErrorUnauthorized("Invalid token subject"))?;

            let collection: mongodb::Collection<User> =
                client.database(DB_NAME).collection(USERS);

            match collection.find_one(doc! { "_id": user_id }).await {
                Ok(Some(user)) => {
                    if user.role == required_role {
                        service.call(req).await
                    } else {
                        Err(ErrorForbidden("Access denied. Insufficient permissions."))
                    }
                }
                Ok(None) => Err(ErrorNotFound("User not found")),
                Err(err) => {
                    log::error!("Role validation error: {:?}", err);
                    Err(ErrorInternalServerError("Internal server error"))
                }
            }
        })
    }
}
