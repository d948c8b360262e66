mod address;
mod contention;
mod simulator;
mod traffic;
