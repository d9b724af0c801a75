pub mod negotiate;
