pub mod mockable;
