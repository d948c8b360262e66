pub mod addr;
pub mod app;
pub mod mobility;
pub mod net;
pub mod queue;
pub mod scenario;
pub mod sim;
pub mod topo;
pub mod trace;

#[cfg(test)]
mod test;
