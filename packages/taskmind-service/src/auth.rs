use crate::{Error, Result, TodoService};

impl TodoService {
	/// Resolves a bearer token to the owning user id.
	pub async fn authenticate(&self, token: &str) -> Result<String> {
		let token = token.trim();

		if token.is_empty() {
			return Err(Error::Unauthorized { message: "Missing bearer token.".to_string() });
		}

		match self.providers.identity.resolve_user(&self.cfg.providers.identity, token).await {
			Ok(Some(user_id)) => Ok(user_id),
			Ok(None) => Err(Error::Unauthorized { message: "Invalid bearer token.".to_string() }),
			Err(err) => {
				tracing::warn!(error = %err, "Identity provider lookup failed.");

				Err(Error::Unauthorized { message: "Invalid bearer token.".to_string() })
			},
		}
	}
}
