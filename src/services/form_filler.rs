//! 表单填写服务 - 业务能力层
//!
//! 字段到页面元素的映射是静态表，启动时校验，运行时不做任何推断

use phf::phf_map;
use tracing::debug;

use crate::error::{AppResult, OrderError};
use crate::infrastructure::PageDriver;
use crate::models::{OrderField, OrderRecord};

/// 输入控件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// 下拉框，按选项值选择
    Select,
    /// 单选框组，按 value 属性点击
    Radio,
    /// 文本输入框
    Text,
}

/// 单个字段的目标控件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTarget {
    pub selector: &'static str,
    pub kind: InputKind,
}

/// 逻辑字段名 → 页面控件
pub static FIELD_TARGETS: phf::Map<&'static str, FieldTarget> = phf_map! {
    "head" => FieldTarget { selector: "#head", kind: InputKind::Select },
    "body" => FieldTarget { selector: "input[type='radio'][name='body']", kind: InputKind::Radio },
    "legs" => FieldTarget {
        selector: "input[placeholder='Enter the part number for the legs']",
        kind: InputKind::Text,
    },
    "address" => FieldTarget { selector: "#address", kind: InputKind::Text },
};

/// 表单填写服务
pub struct OrderFormFiller {
    targets: Vec<(OrderField, FieldTarget)>,
}

impl OrderFormFiller {
    /// 使用内置映射表创建
    pub fn new() -> AppResult<Self> {
        Self::from_table(&FIELD_TARGETS)
    }

    /// 从映射表创建，表中缺少任一字段即报错
    pub fn from_table(table: &phf::Map<&'static str, FieldTarget>) -> AppResult<Self> {
        let targets = OrderField::ALL
            .iter()
            .map(|&field| {
                table
                    .get(field.key())
                    .map(|target| (field, *target))
                    .ok_or_else(|| OrderError::ConfigInvalid {
                        reason: format!("字段 '{}' 没有对应的页面控件", field),
                    })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self { targets })
    }

    /// 检查所有目标控件都在页面上
    pub async fn verify_targets<D: PageDriver>(&self, page: &D) -> AppResult<()> {
        for (field, target) in &self.targets {
            let present = page
                .exists(target.selector)
                .await
                .map_err(|e| OrderError::browser("检查表单控件", e))?;
            if !present {
                return Err(OrderError::ConfigInvalid {
                    reason: format!("页面上找不到字段 '{}' 的控件 {}", field, target.selector),
                });
            }
        }
        debug!("表单控件检查通过 ({} 个字段)", self.targets.len());
        Ok(())
    }

    /// 按映射表填写一条订单
    ///
    /// 重复调用会用相同的值覆盖表单
    pub async fn fill<D: PageDriver>(&self, page: &D, record: &OrderRecord) -> AppResult<()> {
        for (field, target) in &self.targets {
            let value = record.value(*field);
            debug!("填写 {} = {}", field, value);

            let result = match target.kind {
                InputKind::Select => page.select_option(target.selector, value).await,
                InputKind::Radio => page.click(&radio_selector(target.selector, value)).await,
                InputKind::Text => page.fill(target.selector, value).await,
            };

            result.map_err(|e| OrderError::FieldNotFillable {
                field: field.key(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}

/// 单选框组中某个值对应的选择器
fn radio_selector(group: &str, value: &str) -> String {
    format!("{}[value='{}']", group, value.replace('\'', "\\'"))
}
