use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::users::{RegisterUserEntity, UserEntity};

#[async_trait]
#[automock]
pub trait UserRepository {
    async fn register(&self, register_user_entity: RegisterUserEntity) -> Result<UserEntity>;
    async fn find_by_username(&self, username: String) -> Result<Option<UserEntity>>;
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>>;
}
