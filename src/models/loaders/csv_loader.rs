//! 订单数据加载
//!
//! 下载/读取原始 CSV 交给 reqwest 和文件系统，本模块只负责解析和逐行校验

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::{ColumnNames, Config};
use crate::error::{AppResult, OrderError};
use crate::models::order::OrderRecord;

/// 订单数据源
pub struct OrderSource {
    location: String,
    local_copy: Option<PathBuf>,
    columns: ColumnNames,
}

impl OrderSource {
    /// 创建数据源
    ///
    /// `location` 以 `http://` 或 `https://` 开头时下载，否则按本地路径读取
    pub fn new(location: impl Into<String>, columns: ColumnNames) -> Self {
        Self {
            location: location.into(),
            local_copy: None,
            columns,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.orders_source.clone(), config.columns.clone())
            .with_local_copy(config.orders_csv_file.clone())
    }

    /// 下载后的内容同时写入本地文件（覆盖已有文件）
    pub fn with_local_copy(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_copy = Some(path.into());
        self
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// 获取并解析全部订单
    pub async fn load(&self) -> AppResult<Vec<OrderRecord>> {
        let raw = self.fetch().await?;
        let records = parse_orders(&raw, &self.columns)?;
        debug!("解析完成: {} 个订单", records.len());
        Ok(records)
    }

    fn is_remote(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }

    async fn fetch(&self) -> AppResult<String> {
        if !self.is_remote() {
            debug!("读取本地订单文件: {}", self.location);
            return tokio::fs::read_to_string(&self.location)
                .await
                .map_err(|e| self.unavailable(e));
        }

        info!("📥 正在下载订单数据: {}", self.location);
        let response = reqwest::get(&self.location)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.unavailable(e))?;
        let body = response.text().await.map_err(|e| self.unavailable(e))?;

        if let Some(path) = &self.local_copy {
            if let Err(e) = tokio::fs::write(path, &body).await {
                warn!("⚠️ 无法保存订单数据副本 {}: {}", path.display(), e);
            } else {
                debug!("订单数据已保存至 {}", path.display());
            }
        }

        Ok(body)
    }

    fn unavailable(&self, err: impl std::fmt::Display) -> OrderError {
        OrderError::SourceUnavailable {
            location: self.location.clone(),
            reason: err.to_string(),
        }
    }
}

/// 解析 CSV 文本
///
/// 行号从 1 开始计数（不含表头），表头问题报告为第 0 行
pub fn parse_orders(raw: &str, columns: &ColumnNames) -> AppResult<Vec<OrderRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| OrderError::MalformedRecord {
            row: 0,
            reason: e.to_string(),
        })?
        .clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| OrderError::MalformedRecord {
                row: 0,
                reason: format!("缺少列 '{}'", name),
            })
    };
    let order_idx = column(&columns.order_number)?;
    let head_idx = column(&columns.head)?;
    let body_idx = column(&columns.body)?;
    let legs_idx = column(&columns.legs)?;
    let address_idx = column(&columns.address)?;

    let mut records = Vec::new();
    let mut seen: HashMap<u32, usize> = HashMap::new();

    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        let record = result.map_err(|e| OrderError::MalformedRecord {
            row,
            reason: e.to_string(),
        })?;

        let field = |idx: usize, name: &str| -> AppResult<String> {
            match record.get(idx) {
                Some(value) if !value.is_empty() => Ok(value.to_string()),
                _ => Err(OrderError::MalformedRecord {
                    row,
                    reason: format!("缺少字段 '{}'", name),
                }),
            }
        };

        let raw_number = field(order_idx, &columns.order_number)?;
        let order_number = match raw_number.parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(OrderError::MalformedRecord {
                    row,
                    reason: format!("订单号必须为正整数，实际为 '{}'", raw_number),
                })
            }
        };

        if let Some(&first_row) = seen.get(&order_number) {
            return Err(OrderError::DuplicateOrderNumber {
                order_number,
                first_row,
                row,
            });
        }
        seen.insert(order_number, row);

        records.push(OrderRecord {
            order_number,
            head: field(head_idx, &columns.head)?,
            body: field(body_idx, &columns.body)?,
            legs: field(legs_idx, &columns.legs)?,
            address: field(address_idx, &columns.address)?,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Order number,Head,Body,Legs,Address\n";

    fn parse(body: &str) -> AppResult<Vec<OrderRecord>> {
        parse_orders(&format!("{}{}", HEADER, body), &ColumnNames::default())
    }

    #[test]
    fn test_parse_valid_rows_in_order() {
        let records = parse("1,1,2,3,Address 123\n2,4,5,6, Street 9 \n").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].order_number, 1);
        assert_eq!(records[0].head, "1");
        assert_eq!(records[0].legs, "3");
        assert_eq!(records[1].order_number, 2);
        assert_eq!(records[1].address, "Street 9");
    }

    #[test]
    fn test_header_only_is_empty_batch() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_missing_order_number_reports_row() {
        let err = parse("1,1,2,3,A\n,1,2,3,B\n").unwrap_err();
        match err {
            OrderError::MalformedRecord { row, reason } => {
                assert_eq!(row, 2);
                assert!(reason.contains("Order number"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_order_number() {
        let err = parse("abc,1,2,3,A\n").unwrap_err();
        assert!(matches!(err, OrderError::MalformedRecord { row: 1, .. }));
    }

    #[test]
    fn test_zero_order_number_rejected() {
        let err = parse("0,1,2,3,A\n").unwrap_err();
        assert!(matches!(err, OrderError::MalformedRecord { row: 1, .. }));
    }

    #[test]
    fn test_short_row_is_malformed() {
        let err = parse("1,1,2\n").unwrap_err();
        assert!(matches!(err, OrderError::MalformedRecord { row: 1, .. }));
    }

    #[test]
    fn test_missing_column_is_header_error() {
        let err = parse_orders("Order number,Head,Body,Legs\n1,1,2,3\n", &ColumnNames::default())
            .unwrap_err();
        assert!(matches!(err, OrderError::MalformedRecord { row: 0, .. }));
    }

    #[test]
    fn test_duplicate_order_number_detected() {
        let err = parse("5,1,2,3,A\n6,1,2,3,B\n5,2,2,2,C\n").unwrap_err();
        assert!(matches!(
            err,
            OrderError::DuplicateOrderNumber {
                order_number: 5,
                first_row: 1,
                row: 3
            }
        ));
    }

    #[test]
    fn test_custom_column_names() {
        let columns = ColumnNames {
            order_number: "id".to_string(),
            ..ColumnNames::default()
        };
        let records = parse_orders("Address,Legs,Body,Head,id\nSomewhere,3,2,1,42\n", &columns)
            .unwrap();
        assert_eq!(records[0].order_number, 42);
        assert_eq!(records[0].head, "1");
        assert_eq!(records[0].address, "Somewhere");
    }

    #[tokio::test]
    async fn test_missing_local_file_is_unavailable() {
        let source = OrderSource::new("/definitely/not/here/orders.csv", ColumnNames::default());
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, OrderError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_local_file_with_block_on() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("orders.csv");
        std::fs::write(&path, format!("{}7,1,1,1,Home\n", HEADER)).unwrap();

        let source = OrderSource::new(path.to_string_lossy(), ColumnNames::default());
        let records = tokio_test::block_on(source.load()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].order_number, 7);
    }
}
