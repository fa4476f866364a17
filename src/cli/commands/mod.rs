mod keys;
mod reset;
mod users;

pub use keys::{cmd_generate_keys, cmd_list_keys};
pub use reset::cmd_reset;
pub use users::{cmd_create_user, cmd_delete_user, cmd_show_user, cmd_verify};
