use std::sync::Arc;

use taskmind_service::TodoService;
use taskmind_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<TodoService>,
}
impl AppState {
	pub async fn new(config: taskmind_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema(config.storage.vector.dim).await?;

		Ok(Self::from_service(TodoService::new(config, db)))
	}

	pub fn from_service(service: TodoService) -> Self {
		Self { service: Arc::new(service) }
	}
}
