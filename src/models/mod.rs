pub mod forecast;
pub mod observation;
pub mod bom_observations;
pub mod comparison;
