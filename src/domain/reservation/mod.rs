pub mod reservation;
pub mod reservation_store;
pub mod vlan;
