pub mod polar;

pub use polar::{
    PolarCustomer, PolarOrder, PolarOrderList, PolarPagination, PolarProduct, PolarUser,
    PolarWebhookEvent,
};
