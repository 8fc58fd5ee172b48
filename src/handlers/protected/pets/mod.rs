// handlers/protected/pets/mod.rs - Pet endpoints

pub mod collection; // GET, POST /api/pets
pub mod record;     // GET, PUT, DELETE /api/pets/:pet_id

pub use collection::{pets_get, pets_post};
pub use record::{pet_delete, pet_get, pet_put};
