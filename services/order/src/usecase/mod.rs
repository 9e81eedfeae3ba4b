mod manage_order;

pub use manage_order::{
    CreateOrderUseCase, GetOrderUseCase, ListOrdersUseCase, OrderUsKsErr, SeedStoresUseCase,
};
