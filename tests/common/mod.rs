// 集成测试公共模块
//
// 提供测试辅助工具和共享功能

#![allow(dead_code)]

use std::rc::Rc;
use std::sync::Arc;

use autotranslate::dom::{get_node_attr, get_node_name, get_text, Document};
use autotranslate::translation::{AutoTranslator, TranslationDictionary};
use autotranslate::TranslatorConfig;
use markup5ever_rcdom::{Handle, NodeData};

/// 不等待渲染的测试配置
pub fn fast_config() -> TranslatorConfig {
    TranslatorConfig {
        settle_delay_ms: 0,
        ..TranslatorConfig::default()
    }
}

/// 测试环境
pub struct TestEnvironment {
    pub document: Rc<Document>,
    pub translator: AutoTranslator,
}

impl TestEnvironment {
    pub fn new(html: &str) -> Self {
        Self::with_config(html, fast_config())
    }

    pub fn with_config(html: &str, config: TranslatorConfig) -> Self {
        let document = Rc::new(Document::parse(html).expect("fixture should parse"));
        let translator = AutoTranslator::new(config, Rc::clone(&document));
        Self {
            document,
            translator,
        }
    }

    pub fn html(&self) -> String {
        self.document.to_html().expect("document should serialize")
    }

    pub fn element_by_id(&self, id: &str) -> Handle {
        HtmlTestHelper::find_by_id(&self.document.root(), id)
            .unwrap_or_else(|| panic!("no element with id {}", id))
    }

    /// 追加片段到指定元素，返回新增的顶层节点
    pub fn append_html(&self, parent: &Handle, html: &str) -> Vec<Handle> {
        let nodes = Document::parse_fragment(html).expect("fragment should parse");
        for node in &nodes {
            self.document
                .append_child(parent, node)
                .expect("append should succeed");
        }
        nodes
    }
}

/// 测试词典
pub struct TestDictionaries;

impl TestDictionaries {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Arc<TranslationDictionary> {
        Arc::new(pairs.iter().copied().collect())
    }

    /// 收银台常用词汇（阿拉伯语）
    pub fn pos_arabic() -> Arc<TranslationDictionary> {
        Self::from_pairs(&[
            ("Add Barber", "إضافة حلاق"),
            ("Save", "حفظ"),
            ("Search customers", "البحث عن العملاء"),
            ("Checkout", "الدفع"),
            ("Close", "إغلاق"),
            ("Receipts", "الإيصالات"),
            ("Total", "المجموع"),
        ])
    }

    pub fn pos_french() -> Arc<TranslationDictionary> {
        Self::from_pairs(&[
            ("Add Barber", "Ajouter un barbier"),
            ("Save", "Enregistrer"),
            ("Checkout", "Paiement"),
        ])
    }
}

/// HTML测试工具
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    /// 收银台页面
    pub fn create_pos_page() -> String {
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>Barbershop POS</title>
    <style>.total { font-weight: bold; }</style>
</head>
<body>
    <nav>
        <a id="receipts-link" href="/receipts" title="Receipts">Receipts</a>
    </nav>
    <main id="pos">
        <input id="search" type="text" placeholder="Search customers">
        <div id="barbers">
            <button id="add-barber">Add Barber</button>
            <button id="cancel">Cancel</button>
        </div>
        <p class="total">  Total  </p>
        <button id="checkout" aria-label="Checkout">Checkout</button>
    </main>
    <script>window.labels = ["Save", "Checkout"];</script>
</body>
</html>"#
            .to_string()
    }

    /// 按 id 查找元素
    pub fn find_by_id(root: &Handle, id: &str) -> Option<Handle> {
        Self::find(root, &|node| get_node_attr(node, "id").as_deref() == Some(id))
    }

    /// 按标签名查找第一个元素
    pub fn find_by_tag(root: &Handle, tag: &str) -> Option<Handle> {
        Self::find(root, &|node| get_node_name(node) == Some(tag))
    }

    fn find(root: &Handle, predicate: &dyn Fn(&Handle) -> bool) -> Option<Handle> {
        if matches!(root.data, NodeData::Element { .. }) && predicate(root) {
            return Some(root.clone());
        }
        for child in root.children.borrow().iter() {
            if let Some(found) = Self::find(child, predicate) {
                return Some(found);
            }
        }
        None
    }

    /// 元素的第一个文本子节点
    pub fn first_text_node(element: &Handle) -> Handle {
        element
            .children
            .borrow()
            .iter()
            .find(|child| matches!(child.data, NodeData::Text { .. }))
            .cloned()
            .expect("element should have a text child")
    }

    /// 元素的直接文本内容（去除首尾空白）
    pub fn text_of(element: &Handle) -> String {
        element
            .children
            .borrow()
            .iter()
            .filter_map(get_text)
            .collect::<String>()
            .trim()
            .to_string()
    }
}
