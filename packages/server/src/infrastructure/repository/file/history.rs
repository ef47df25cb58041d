//! JSON Lines ファイルに追記する HistoryStore 実装
//!
//! 1 行 1 件の JSON を追記し、起動時に読み込んで直近分をメモリに載せる。
//! `recent` はメモリ上のリングバッファから返す。

use std::path::Path;

use async_trait::async_trait;
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};

use crate::{
    domain::{HistoryEntry, HistoryStore, StoreError},
    infrastructure::repository::inmemory::InMemoryHistoryStore,
};

/// JSON Lines HistoryStore 実装
pub struct JsonLinesHistoryStore {
    recent: InMemoryHistoryStore,
    /// 追記用ハンドル。ロックでファイルとメモリへの追記順をそろえる
    log: Mutex<LineLog<File>>,
}

/// 行単位の追記先
///
/// 書き込みに失敗した行は途中まで書かれている可能性があるので、
/// 次の追記の前に改行を入れて壊れた行を閉じる。
struct LineLog<W> {
    writer: W,
    torn: bool,
}

impl<W: AsyncWrite + Unpin> LineLog<W> {
    async fn append_line(&mut self, line: &[u8]) -> std::io::Result<()> {
        if self.torn {
            self.writer.write_all(b"\n").await?;
            self.torn = false;
        }
        let result = match self.writer.write_all(line).await {
            Ok(()) => self.writer.flush().await,
            Err(e) => Err(e),
        };
        if result.is_err() {
            self.torn = true;
        }
        result
    }
}

impl JsonLinesHistoryStore {
    /// ファイルを開く（存在しなければ作成）
    ///
    /// 壊れた行は読み飛ばす。
    pub async fn open(path: impl AsRef<Path>, capacity: usize) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut recent = InMemoryHistoryStore::with_capacity(capacity);
        let mut torn = false;

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                torn = !content.is_empty() && !content.ends_with('\n');
                for (line_no, line) in content.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<HistoryEntry>(line) {
                        Ok(entry) => recent.push_loaded(entry),
                        Err(e) => tracing::warn!(
                            "Skipping corrupt history line {} in {}: {}",
                            line_no + 1,
                            path.display(),
                            e
                        ),
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        tracing::info!(
            "History file {} opened ({} entries in memory)",
            path.display(),
            recent.len().await
        );

        Ok(Self {
            recent,
            log: Mutex::new(LineLog { writer: file, torn }),
        })
    }
}

#[async_trait]
impl HistoryStore for JsonLinesHistoryStore {
    async fn append(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let mut log = self.log.lock().await;
        log.append_line(&line).await?;
        self.recent.append(entry).await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        self.recent.recent(limit).await
    }
}
