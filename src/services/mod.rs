pub mod credential;
pub mod session;

pub use credential::CredentialService;
pub use session::SessionService;
