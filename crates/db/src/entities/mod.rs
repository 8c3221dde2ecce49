//! Database entities.

pub mod actor;
pub mod actor_keypair;
pub mod blog;
pub mod following;
pub mod instance;
pub mod notification;
pub mod post;

pub use actor::Entity as Actor;
pub use actor_keypair::Entity as ActorKeypair;
pub use blog::Entity as Blog;
pub use following::Entity as Following;
pub use instance::Entity as Instance;
pub use notification::Entity as Notification;
pub use post::Entity as Post;
