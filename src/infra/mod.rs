pub mod doctor;
pub mod webhook;
