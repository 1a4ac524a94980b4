//! 基础设施层
//!
//! 持有稀缺资源（浏览器页面），只暴露能力

pub mod chrome_page;
pub mod page_driver;
pub mod session;

#[cfg(test)]
pub(crate) mod fake_page;

pub use chrome_page::ChromePage;
pub use page_driver::{PageDriver, PdfRenderer};
pub use session::{BrowserSession, PageFactory};
