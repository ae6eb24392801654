//! 增量翻译集成测试
//!
//! 全文档翻译之后插入的内容通过变更观察器翻译

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use autotranslate::dom::{get_node_attr, Document, MutationObserver, MutationRecord};
use autotranslate::translation::{LanguageRequest, PassOutcome};

use common::{HtmlTestHelper, TestDictionaries, TestEnvironment};

fn arabic() -> LanguageRequest {
    LanguageRequest::new("ar", TestDictionaries::pos_arabic())
}

/// 记录每个批次中的插入记录数
struct InsertionCounter {
    batches: RefCell<Vec<usize>>,
}

impl MutationObserver for InsertionCounter {
    fn on_mutations(&self, records: &[MutationRecord]) {
        let insertions = records
            .iter()
            .filter(|record| !record.added_nodes().is_empty())
            .count();
        self.batches.borrow_mut().push(insertions);
    }
}

/// 新插入的子树被翻译，之前翻译的节点不受影响
#[tokio::test]
async fn test_inserted_subtree_is_translated() {
    let env = TestEnvironment::new(&HtmlTestHelper::create_pos_page());
    env.translator.on_language_change(arabic()).await;
    let checkout = env.element_by_id("checkout");
    let ledger_before = env.translator.ledger_len();

    let barbers = env.element_by_id("barbers");
    let added = env.append_html(
        &barbers,
        "<div class=\"modal\"><button id=\"modal-save\" title=\"Close\">Save</button></div>",
    );
    assert_eq!(added.len(), 1);
    assert!(env.document.deliver_mutations() > 0);

    let save = env.element_by_id("modal-save");
    assert_eq!(HtmlTestHelper::text_of(&save), "حفظ");
    assert_eq!(get_node_attr(&save, "title").as_deref(), Some("إغلاق"));
    assert_eq!(env.translator.ledger_len(), ledger_before + 2);

    assert_eq!(HtmlTestHelper::text_of(&checkout), "الدفع");
    assert_eq!(get_node_attr(&checkout, "aria-label").as_deref(), Some("الدفع"));
}

/// 同一回合的多次插入合并为一次处理
#[tokio::test]
async fn test_insertions_in_one_tick_share_a_batch() {
    let env = TestEnvironment::new(&HtmlTestHelper::create_pos_page());
    env.translator.on_language_change(arabic()).await;

    let counter = Rc::new(InsertionCounter {
        batches: RefCell::new(Vec::new()),
    });
    let body = env.document.body().unwrap();
    env.document.observe(&body, counter.clone());

    let barbers = env.element_by_id("barbers");
    env.append_html(&barbers, "<button>Add Barber</button>");
    env.append_html(&barbers, "<button>Checkout</button>");
    env.append_html(&barbers, "<span>Receipts</span>");
    env.document.deliver_mutations();

    // 第一批包含全部插入，之后只有翻译产生的文本变更
    let batches = counter.batches.borrow();
    assert_eq!(batches[0], 3);
    assert!(batches[1..].iter().all(|&insertions| insertions == 0));
    assert_eq!(env.translator.ledger_len(), 7 + 3);
    let html = env.html();
    assert!(html.contains("<button>إضافة حلاق</button>"));
    assert!(html.contains("<span>الإيصالات</span>"));
}

/// 移动已翻译的节点不会被再次翻译
#[tokio::test]
async fn test_moved_translated_node_is_not_reprocessed() {
    let env = TestEnvironment::new("<div id=\"a\"><button id=\"save\">Save</button></div><div id=\"b\"></div>");
    // "حفظ" 也作为键，若被重复处理会变成 "X"
    let dictionary = TestDictionaries::from_pairs(&[("Save", "حفظ"), ("حفظ", "X")]);
    env.translator
        .on_language_change(LanguageRequest::new("ar", dictionary))
        .await;

    let save = env.element_by_id("save");
    let target = env.element_by_id("b");
    env.document.append_child(&target, &save).unwrap();
    env.document.deliver_mutations();

    assert_eq!(HtmlTestHelper::text_of(&save), "حفظ");
    assert_eq!(env.translator.ledger_len(), 1);

    env.translator
        .on_language_change(LanguageRequest::without_dictionary("en"))
        .await;
    assert_eq!(HtmlTestHelper::text_of(&save), "Save");
}

/// 被移除的已翻译节点从账本中清理，还原时不再计为失败
#[tokio::test]
async fn test_removed_translated_node_is_pruned() {
    let env = TestEnvironment::new(&HtmlTestHelper::create_pos_page());
    env.translator.on_language_change(arabic()).await;
    assert_eq!(env.translator.ledger_len(), 7);

    let add = env.element_by_id("add-barber");
    env.document.detach(&add).unwrap();
    env.document.deliver_mutations();
    assert_eq!(env.translator.ledger_len(), 6);

    let outcome = env
        .translator
        .on_language_change(LanguageRequest::without_dictionary("en"))
        .await;
    let PassOutcome::Completed { report, .. } = outcome else {
        panic!("expected a completed pass, got {:?}", outcome);
    };
    assert_eq!(report.restored, 6);
    assert_eq!(report.failed, 0);
}

/// 源语言下观察器不工作
#[tokio::test]
async fn test_watcher_inert_in_source_language() {
    let env = TestEnvironment::new(&HtmlTestHelper::create_pos_page());
    env.translator.on_language_change(arabic()).await;
    env.translator
        .on_language_change(LanguageRequest::without_dictionary("en"))
        .await;
    assert!(!env.translator.is_watching());
    assert_eq!(env.document.observer_count(), 0);

    let barbers = env.element_by_id("barbers");
    env.append_html(&barbers, "<button id=\"late\">Add Barber</button>");
    env.document.deliver_mutations();

    assert_eq!(HtmlTestHelper::text_of(&env.element_by_id("late")), "Add Barber");
    assert_eq!(env.translator.ledger_len(), 0);
}

/// 插入的文本节点直接作为子树根
#[tokio::test]
async fn test_inserted_text_node_is_translated() {
    let env = TestEnvironment::new("<p id=\"status\"></p><script id=\"s\"></script>");
    env.translator.on_language_change(arabic()).await;

    let status = env.element_by_id("status");
    let script = env.element_by_id("s");
    env.document
        .append_child(&status, &Document::create_text(" Total "))
        .unwrap();
    env.document
        .append_child(&script, &Document::create_text("Total"))
        .unwrap();
    env.document.deliver_mutations();

    assert_eq!(HtmlTestHelper::text_of(&status), "المجموع");
    assert_eq!(HtmlTestHelper::text_of(&script), "Total");
    assert_eq!(env.translator.ledger_len(), 1);
}

/// 卸载后插入的内容不翻译，重新挂载后恢复增量翻译
#[tokio::test]
async fn test_unmount_and_mount_recreate_watcher() {
    let env = TestEnvironment::new(&HtmlTestHelper::create_pos_page());
    env.translator.on_language_change(arabic()).await;
    let barbers = env.element_by_id("barbers");

    env.translator.unmount();
    assert!(!env.translator.is_watching());
    env.append_html(&barbers, "<button id=\"while-unmounted\">Save</button>");
    env.document.deliver_mutations();
    assert_eq!(
        HtmlTestHelper::text_of(&env.element_by_id("while-unmounted")),
        "Save"
    );

    env.translator.mount();
    assert!(env.translator.is_watching());
    assert_eq!(env.document.observer_count(), 1);
    env.append_html(&barbers, "<button id=\"after-mount\">Save</button>");
    env.document.deliver_mutations();
    assert_eq!(HtmlTestHelper::text_of(&env.element_by_id("after-mount")), "حفظ");
}

/// 全文档处理完成前插入的内容由全文档处理覆盖
#[tokio::test]
async fn test_insertion_before_pass_is_covered_by_full_pass() {
    let env = TestEnvironment::new(&HtmlTestHelper::create_pos_page());
    let pending = env.translator.on_language_change(arabic());

    let barbers = env.element_by_id("barbers");
    env.append_html(&barbers, "<button id=\"early\">Save</button>");

    let outcome = pending.await;
    assert!(matches!(outcome, PassOutcome::Completed { .. }));
    assert_eq!(env.document.deliver_mutations(), 0);
    assert_eq!(HtmlTestHelper::text_of(&env.element_by_id("early")), "حفظ");
}
