//! Database repositories.

mod actor;
mod actor_keypair;
mod blog;
mod following;
mod instance;
mod notification;
mod post;

pub use actor::ActorRepository;
pub use actor_keypair::ActorKeypairRepository;
pub use blog::BlogRepository;
pub use following::FollowingRepository;
pub use instance::InstanceRepository;
pub use notification::NotificationRepository;
pub use post::PostRepository;
