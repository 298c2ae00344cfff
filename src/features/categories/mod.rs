//! Category taxonomy feature.
//!
//! Categories are a single flat table partitioned by `category_type`
//! (`HEADER_MENU`, `COURSE`, `NEWS`, ...). Every read endpoint loads the whole
//! table and rebuilds the hierarchy in memory, see [`graph`].
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/categories` | Flat list, optional `categoryType` filter |
//! | GET | `/api/categories/tree` | Full forest, type roots (`categoryType`) or one subtree (`slugOrUrl`) |
//! | GET | `/api/categories/header-menu` | Navigation menu (`HEADER_MENU` only) |
//! | GET | `/api/categories/{id}` | Get category by id |
//! | POST | `/api/admin/categories` | Create category (admin) |
//! | PUT | `/api/admin/categories/{id}` | Update category (admin) |
//! | DELETE | `/api/admin/categories/{id}` | Delete category (admin) |

pub mod dtos;
pub mod graph;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::CategoryService;
