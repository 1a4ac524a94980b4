//! 下单页面上的固定元素

/// 首次打开页面时弹出的提示框
pub const MODAL: &str = ".modal-dialog";
/// 提示框上的确认按钮
pub const MODAL_DISMISS: &str = ".modal-dialog .btn-dark";
/// 预览按钮
pub const PREVIEW: &str = "#preview";
/// 机器人预览图
pub const PREVIEW_IMAGE: &str = "#robot-preview-image";
/// 下单按钮
pub const SUBMIT: &str = "#order";
/// 服务端临时错误提示
pub const SERVER_ERROR: &str = ".alert.alert-danger";
/// 下单成功后的回执
pub const RECEIPT: &str = "#receipt";
/// "再下一单"按钮
pub const ORDER_ANOTHER: &str = "#order-another";
