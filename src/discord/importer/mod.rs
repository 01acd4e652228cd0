pub mod serenity_backend;

pub use serenity_backend::SerenityBackend;
