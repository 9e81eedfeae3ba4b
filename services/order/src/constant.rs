use crate::WebApiHdlrLabel;

pub mod hard_limit {
    pub const MAX_ITEMS_STORED_PER_MODEL: u32 = 2200u32;
}

/// value of the `type` attribute of each record in the shared table
pub mod record_kind {
    pub const ORDER: &str = "Orders";
    pub const STORE: &str = "Stores";
}

pub mod fault {
    // a draw strictly above this value fails the request
    pub const FAILURE_THRESHOLD: f64 = 0.1;
    pub const SWITCH_OFF: &str = "false";
}

pub(crate) mod api {
    use super::WebApiHdlrLabel;

    #[allow(non_camel_case_types)]
    pub(crate) struct web {}

    impl web {
        pub(crate) const CREATE_NEW_ORDER: WebApiHdlrLabel = "create_new_order";
        pub(crate) const LIST_ORDERS: WebApiHdlrLabel = "list_orders";
        pub(crate) const GET_ORDER: WebApiHdlrLabel = "get_order";
        pub(crate) const HEALTH_CHECK: WebApiHdlrLabel = "health_check";
    }
}

pub(crate) const HTTP_CONTENT_TYPE_JSON: &str = "application/json";
pub(crate) const INVOICE_KEY_SUFFIX: &str = "-invoice.txt";
