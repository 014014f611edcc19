pub mod crop;
pub mod levels;
pub mod location;
pub mod observation;
