pub mod article;
pub mod row;
pub mod table;
pub mod view;

pub use article::ArticleSnapshot;
pub use row::{round_to, PageRow, QueryRow};
pub use table::{Cell, Column, PageTable, QueryTable, Table};
pub use view::ViewSet;
