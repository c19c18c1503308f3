pub mod agenda;
pub mod cab;
pub mod document;
pub mod feedback;
pub mod gallery;
pub mod invitee;
pub mod message;
pub mod pagination;
pub mod response;
pub mod user;

pub use agenda::*;
pub use cab::*;
pub use document::*;
pub use feedback::*;
pub use gallery::*;
pub use invitee::*;
pub use message::*;
pub use pagination::*;
pub use response::*;
pub use user::*;
