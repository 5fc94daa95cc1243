pub mod boxplot;
pub mod canvas;
pub mod composite;
pub mod draw;
pub mod layout;
pub mod multisite;
pub mod summary;
pub mod temporal;
