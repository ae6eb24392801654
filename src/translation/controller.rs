//! 自动翻译生命周期控制器
//!
//! 应用内唯一的入口：每次语言或词典变化时调用 `on_language_change`。
//! 同一时刻最多一次处理在进行；处理进行中到达的请求被丢弃，但会记住
//! 最后一次被丢弃的值，处理结束后若文档状态已过期则立即补做一次。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::{ready, FutureExt, LocalBoxFuture};
use tokio::sync::watch;

use crate::config::TranslatorConfig;
use crate::dom::Document;

use super::ledger::TranslationLedger;
use super::store::LanguageRequest;
use super::synchronizer::{DomSynchronizer, PassReport};
use super::watcher::MutationWatcher;

/// 一次语言切换请求的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// 处理完成；`passes` 包含因过期而补做的次数
    Completed { passes: usize, report: PassReport },
    /// 已有处理在进行，请求被丢弃
    Dropped,
    /// 控制器已关闭
    ShutDown,
}

struct Inner {
    config: TranslatorConfig,
    document: Rc<Document>,
    synchronizer: Rc<RefCell<DomSynchronizer>>,
    watcher: RefCell<MutationWatcher>,
    in_flight: Cell<bool>,
    mounted: Cell<bool>,
    shut_down: Cell<bool>,
    latest_dropped: RefCell<Option<LanguageRequest>>,
    applied: RefCell<Option<LanguageRequest>>,
    completed_passes: Cell<usize>,
}

/// 处理结束（包括 future 被丢弃）时清除进行中标记
///
/// 被丢弃的请求只属于这一次处理，一并清除，不能留给之后更新的请求去补做。
struct InFlightGuard(Rc<Inner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.latest_dropped.borrow_mut().take();
        self.0.in_flight.set(false);
    }
}

/// 自动翻译器
///
/// 显式构造、显式关闭；克隆得到的是同一个实例的句柄。
#[derive(Clone)]
pub struct AutoTranslator {
    inner: Rc<Inner>,
}

impl std::fmt::Debug for AutoTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoTranslator")
            .field("in_flight", &self.inner.in_flight.get())
            .field("mounted", &self.inner.mounted.get())
            .field("shut_down", &self.inner.shut_down.get())
            .field("completed_passes", &self.inner.completed_passes.get())
            .finish()
    }
}

impl AutoTranslator {
    pub fn new(config: TranslatorConfig, document: Rc<Document>) -> Self {
        let synchronizer = Rc::new(RefCell::new(DomSynchronizer::new(&config)));
        Self::with_synchronizer(config, document, synchronizer)
    }

    /// 使用自定义同步器（例如自定义跳过规则）
    pub fn with_synchronizer(
        config: TranslatorConfig,
        document: Rc<Document>,
        synchronizer: Rc<RefCell<DomSynchronizer>>,
    ) -> Self {
        let watcher = MutationWatcher::new(Rc::clone(&synchronizer));
        Self {
            inner: Rc::new(Inner {
                config,
                document,
                synchronizer,
                watcher: RefCell::new(watcher),
                in_flight: Cell::new(false),
                mounted: Cell::new(true),
                shut_down: Cell::new(false),
                latest_dropped: RefCell::new(None),
                applied: RefCell::new(None),
                completed_passes: Cell::new(0),
            }),
        }
    }

    pub fn document(&self) -> &Rc<Document> {
        &self.inner.document
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.inner.config
    }

    pub fn is_translating(&self) -> bool {
        self.inner.in_flight.get()
    }

    pub fn is_watching(&self) -> bool {
        self.inner.watcher.borrow().is_watching()
    }

    /// 已完成的全文档处理次数
    pub fn completed_passes(&self) -> usize {
        self.inner.completed_passes.get()
    }

    /// 当前文档所处的语言
    pub fn active_language(&self) -> String {
        self.inner.synchronizer.borrow().active_language().to_string()
    }

    pub fn ledger_len(&self) -> usize {
        self.inner.synchronizer.borrow().ledger().len()
    }

    /// 以只读方式访问账本
    pub fn with_ledger<R>(&self, f: impl FnOnce(&TranslationLedger) -> R) -> R {
        f(self.inner.synchronizer.borrow().ledger())
    }

    /// 语言或词典变化时调用
    ///
    /// 进行中标记在调用时立即设置，所以连续两次同步调用中第二次会被丢弃。
    pub fn on_language_change(&self, request: LanguageRequest) -> LocalBoxFuture<'static, PassOutcome> {
        if self.inner.shut_down.get() {
            return ready(PassOutcome::ShutDown).boxed_local();
        }

        if self.inner.in_flight.replace(true) {
            tracing::debug!("翻译进行中，丢弃语言切换请求: {}", request.language);
            *self.inner.latest_dropped.borrow_mut() = Some(request);
            return ready(PassOutcome::Dropped).boxed_local();
        }

        let guard = InFlightGuard(Rc::clone(&self.inner));
        async move {
            let inner = Rc::clone(&guard.0);
            settle(&inner.config).await;

            if inner.shut_down.get() {
                return PassOutcome::ShutDown;
            }

            let mut request = request;
            let mut report = inner.run_pass(&request);
            let mut passes = 1;

            loop {
                let dropped = inner.latest_dropped.borrow_mut().take();
                match dropped {
                    Some(next) if !next.same_as(&request) => {
                        tracing::debug!("文档状态已过期，补做语言 {} 的处理", next.language);
                        request = next;
                        report = inner.run_pass(&request);
                        passes += 1;
                    }
                    _ => break,
                }
            }

            drop(guard);
            PassOutcome::Completed { passes, report }
        }
        .boxed_local()
    }

    /// 跟随语言状态通道，直到发送端关闭
    pub async fn follow(&self, mut receiver: watch::Receiver<LanguageRequest>) {
        loop {
            let request = receiver.borrow_and_update().clone();
            let outcome = self.on_language_change(request).await;
            if outcome == PassOutcome::ShutDown {
                break;
            }
            if receiver.changed().await.is_err() {
                break;
            }
        }
    }

    /// 界面卸载：断开变更观察器
    pub fn unmount(&self) {
        self.inner.mounted.set(false);
        self.inner.watcher.borrow_mut().disconnect();
    }

    /// 界面重新挂载：当前语言为目标语言时重新连接观察器
    ///
    /// 关闭之后不再挂载。
    pub fn mount(&self) {
        if self.inner.shut_down.get() {
            tracing::debug!("自动翻译器已关闭，忽略挂载");
            return;
        }
        self.inner.mounted.set(true);
        let applied = self.inner.applied.borrow().clone();
        if let Some(request) = applied {
            self.inner.start_watching(&request);
        }
    }

    /// 关闭：断开观察器并拒绝之后的请求，已翻译的文本保持原样
    pub fn shutdown(&self) {
        self.inner.shut_down.set(true);
        self.inner.watcher.borrow_mut().disconnect();
        tracing::info!("自动翻译器已关闭");
    }
}

impl Inner {
    /// 全文档处理完成后才（重新）连接观察器
    fn run_pass(&self, request: &LanguageRequest) -> PassReport {
        self.watcher.borrow_mut().disconnect();

        let report = match self.synchronizer.try_borrow_mut() {
            Ok(mut synchronizer) => synchronizer.translate_full_document(
                &self.document,
                &request.language,
                &request.dictionary,
            ),
            Err(_) => {
                tracing::warn!("同步器正忙，跳过语言 {} 的处理", request.language);
                PassReport::default()
            }
        };

        *self.applied.borrow_mut() = Some(request.clone());
        self.completed_passes.set(self.completed_passes.get() + 1);

        if self.mounted.get() {
            self.start_watching(request);
        }
        report
    }

    fn start_watching(&self, request: &LanguageRequest) {
        if self.config.is_source_language(&request.language) {
            self.watcher.borrow_mut().disconnect();
            return;
        }

        match self.document.body() {
            Some(body) => self.watcher.borrow_mut().observe(
                &self.document,
                &body,
                std::sync::Arc::clone(&request.dictionary),
            ),
            None => tracing::warn!("文档没有 body，无法观察变更"),
        }
    }
}

async fn settle(config: &TranslatorConfig) {
    let delay = config.settle_delay();
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}
