pub mod category;
pub mod expense;
pub mod money;
pub mod user;

pub use category::{default_categories, CategoryCreate, CategoryRead, CategoryUpdate, NewCategory};
pub use expense::{ExpenseCreate, ExpenseRead, ExpenseUpdate, NewExpense};
pub use money::Money;
pub use user::{validate_email, UserAdminUpdate, UserCreate, UserRead, UserUpdate};
