pub mod pet;
pub mod user;

pub use pet::{NewPet, Pet, PetChanges};
pub use user::{NewUser, Role, User, UserProfile, UserResponse, UserRow};
