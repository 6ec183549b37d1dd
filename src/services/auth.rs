//! Authentication stub.
//!
//! Real session management belongs to an external auth collaborator; the
//! only interface the game needs from it is the current user's id.

/// Stand-in auth service resolving every request to one configured user.
#[derive(Debug, Clone)]
pub struct AuthService {
    user_id: String,
}

impl AuthService {
    pub fn new(user_id: String) -> Self {
        Self { user_id }
    }

    /// The id of the calling user.
    // TODO: replace with a session lookup once the auth collaborator exists
    pub fn current_user_id(&self) -> &str {
        &self.user_id
    }
}
