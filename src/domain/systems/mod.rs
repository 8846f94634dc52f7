pub mod arena;

pub use arena::ArenaPhysics;
