pub mod video;

pub use video::Entity as Video;
