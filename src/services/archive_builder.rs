//! 压缩包服务 - 业务能力层
//!
//! 把回执目录当前的全部文件打进一个 zip，覆盖旧的压缩包

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{AppResult, OrderError};

/// 压缩包写入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    /// 压缩包内的文件名，按名称排序
    pub entries: Vec<String>,
}

/// 压缩包服务
pub struct ArchiveBuilder;

impl ArchiveBuilder {
    /// 打包 `receipts_dir` 下的所有文件到 `archive_path`
    ///
    /// 先写临时文件再改名，失败时不会留下残缺的压缩包
    pub fn build(receipts_dir: &Path, archive_path: &Path) -> AppResult<ArchiveSummary> {
        let failed = |reason: String| OrderError::ArchiveWriteFailed {
            path: archive_path.to_path_buf(),
            reason,
        };

        let files = collect_files(receipts_dir, archive_path)
            .map_err(|e| failed(format!("无法读取目录 {}: {}", receipts_dir.display(), e)))?;

        if let Some(parent) = archive_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| failed(e.to_string()))?;
        }

        let tmp_path = temp_path(archive_path);
        let entries = match write_zip(&tmp_path, &files) {
            Ok(entries) => entries,
            Err(reason) => {
                let _ = fs::remove_file(&tmp_path);
                return Err(failed(reason));
            }
        };

        fs::rename(&tmp_path, archive_path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            failed(e.to_string())
        })?;

        info!(
            "📦 压缩包已生成: {} ({} 个文件)",
            archive_path.display(),
            entries.len()
        );

        Ok(ArchiveSummary {
            path: archive_path.to_path_buf(),
            entries,
        })
    }
}

/// 目录下的普通文件，跳过压缩包自身和它的临时文件
fn collect_files(dir: &Path, archive_path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let archive_abs = absolute(archive_path);
    let tmp_abs = absolute(&temp_path(archive_path));

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let path_abs = absolute(&path);
        if path_abs == archive_abs || path_abs == tmp_abs {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

fn write_zip(tmp_path: &Path, files: &[PathBuf]) -> Result<Vec<String>, String> {
    let file = File::create(tmp_path).map_err(|e| e.to_string())?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| format!("无效的文件名: {}", path.display()))?;
        let data = fs::read(path).map_err(|e| format!("读取 {} 失败: {}", path.display(), e))?;

        debug!("添加到压缩包: {} ({} 字节)", name, data.len());
        zip.start_file(name.as_str(), options)
            .map_err(|e| e.to_string())?;
        zip.write_all(&data).map_err(|e| e.to_string())?;
        entries.push(name);
    }

    zip.finish().map_err(|e| e.to_string())?;
    Ok(entries)
}

fn temp_path(archive_path: &Path) -> PathBuf {
    let mut name = archive_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    archive_path.with_file_name(name)
}

fn absolute(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            fs::canonicalize(parent)
                .map(|p| p.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}
