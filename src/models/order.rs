use serde::Serialize;

/// 一行订单数据
///
/// 解析后不再修改；`order_number` 是所有输出文件名的唯一键
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub order_number: u32,
    /// 头部型号（下拉框选项值）
    pub head: String,
    /// 身体型号（单选框值）
    pub body: String,
    /// 腿部零件号
    pub legs: String,
    /// 收货地址
    pub address: String,
}

impl OrderRecord {
    /// 按逻辑字段取值
    pub fn value(&self, field: OrderField) -> &str {
        match field {
            OrderField::Head => &self.head,
            OrderField::Body => &self.body,
            OrderField::Legs => &self.legs,
            OrderField::Address => &self.address,
        }
    }
}

/// 需要填入表单的逻辑字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderField {
    Head,
    Body,
    Legs,
    Address,
}

impl OrderField {
    /// 按表单填写顺序排列
    pub const ALL: [OrderField; 4] = [
        OrderField::Head,
        OrderField::Body,
        OrderField::Legs,
        OrderField::Address,
    ];

    pub fn key(self) -> &'static str {
        match self {
            OrderField::Head => "head",
            OrderField::Body => "body",
            OrderField::Legs => "legs",
            OrderField::Address => "address",
        }
    }
}

impl std::fmt::Display for OrderField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}
