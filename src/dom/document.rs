//! 可观察的活动文档
//!
//! 所有会被观察到的修改都必须经过 `Document`，它负责把变更记录
//! 排入每个观察者各自的队列，并在宿主调用 `deliver_mutations` 时批量投递。

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::StrTendril;
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

use crate::config::constants;
use crate::error::{DomError, TranslatorError, TranslatorResult};

use super::mutation::{MutationObserver, MutationRecord, ObserverId, Registration};
use super::node::{get_child_node_by_name, html_to_dom, is_inclusive_ancestor, parent_node};

/// 活动文档
pub struct Document {
    dom: RcDom,
    registrations: RefCell<Vec<Registration>>,
    next_observer_id: Cell<u64>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("observers", &self.registrations.borrow().len())
            .finish()
    }
}

impl Document {
    /// 解析 UTF-8 HTML
    pub fn parse(html: &str) -> TranslatorResult<Self> {
        Self::from_bytes(html.as_bytes(), "utf-8")
    }

    /// 按指定编码解析 HTML 字节
    pub fn from_bytes(data: &[u8], document_encoding: &str) -> TranslatorResult<Self> {
        Ok(Self::from_dom(html_to_dom(data, document_encoding)?))
    }

    pub fn from_dom(dom: RcDom) -> Self {
        Self {
            dom,
            registrations: RefCell::new(Vec::new()),
            next_observer_id: Cell::new(1),
        }
    }

    /// 文档根节点
    pub fn root(&self) -> Handle {
        self.dom.document.clone()
    }

    /// `<body>` 元素
    pub fn body(&self) -> Option<Handle> {
        let html = get_child_node_by_name(&self.dom.document, "html")?;
        get_child_node_by_name(&html, "body")
    }

    /// 判断节点是否仍连接在文档中
    pub fn contains(&self, node: &Handle) -> bool {
        is_inclusive_ancestor(&self.dom.document, node)
    }

    fn ensure_connected(&self, node: &Handle) -> Result<(), DomError> {
        if self.contains(node) {
            Ok(())
        } else {
            Err(DomError::Detached)
        }
    }

    // ------------------------------------------------------------------
    // 修改
    // ------------------------------------------------------------------

    /// 替换文本节点内容
    pub fn set_text(&self, node: &Handle, value: &str) -> Result<(), DomError> {
        let NodeData::Text { contents } = &node.data else {
            return Err(DomError::NotText);
        };
        self.ensure_connected(node)?;

        let old_value = {
            let mut contents = contents.borrow_mut();
            let old_value = contents.to_string();
            *contents = StrTendril::from_slice(value);
            old_value
        };

        self.queue_record(MutationRecord::CharacterData {
            target: node.clone(),
            old_value,
        });
        Ok(())
    }

    /// 替换已存在的属性值
    pub fn replace_attr(&self, node: &Handle, attr_name: &str, value: &str) -> Result<(), DomError> {
        let NodeData::Element { attrs, .. } = &node.data else {
            return Err(DomError::NotElement);
        };
        self.ensure_connected(node)?;

        let old_value = {
            let mut attrs = attrs.borrow_mut();
            let attr = attrs
                .iter_mut()
                .find(|attr| &*attr.name.local == attr_name)
                .ok_or_else(|| DomError::MissingAttribute(attr_name.to_string()))?;
            let old_value = attr.value.to_string();
            attr.value = StrTendril::from_slice(value);
            old_value
        };

        self.queue_record(MutationRecord::Attributes {
            target: node.clone(),
            name: attr_name.to_string(),
            old_value: Some(old_value),
        });
        Ok(())
    }

    /// 移除属性，返回被移除的值
    pub fn remove_attr(&self, node: &Handle, attr_name: &str) -> Result<Option<String>, DomError> {
        let NodeData::Element { attrs, .. } = &node.data else {
            return Err(DomError::NotElement);
        };
        self.ensure_connected(node)?;

        let removed = {
            let mut attrs = attrs.borrow_mut();
            let position = attrs.iter().position(|attr| &*attr.name.local == attr_name);
            position.map(|i| attrs.remove(i).value.to_string())
        };

        if removed.is_some() {
            self.queue_record(MutationRecord::Attributes {
                target: node.clone(),
                name: attr_name.to_string(),
                old_value: removed.clone(),
            });
        }
        Ok(removed)
    }

    /// 追加子节点；子节点已有父节点时先将其移出
    pub fn append_child(&self, parent: &Handle, child: &Handle) -> Result<(), DomError> {
        if !matches!(parent.data, NodeData::Element { .. } | NodeData::Document) {
            return Err(DomError::NotElement);
        }
        if is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }

        self.detach(child)?;

        parent.children.borrow_mut().push(child.clone());
        child.parent.set(Some(Rc::downgrade(parent)));

        self.queue_record(MutationRecord::ChildList {
            target: parent.clone(),
            added: vec![child.clone()],
            removed: Vec::new(),
        });
        Ok(())
    }

    /// 移除子节点
    pub fn remove_child(&self, parent: &Handle, child: &Handle) -> Result<(), DomError> {
        let removed = {
            let mut children = parent.children.borrow_mut();
            let position = children
                .iter()
                .position(|candidate| Rc::ptr_eq(candidate, child))
                .ok_or(DomError::NotChild)?;
            children.remove(position)
        };
        removed.parent.set(None);

        self.queue_record(MutationRecord::ChildList {
            target: parent.clone(),
            added: Vec::new(),
            removed: vec![removed],
        });
        Ok(())
    }

    /// 将节点从其父节点移出（没有父节点时不做任何事）
    pub fn detach(&self, node: &Handle) -> Result<(), DomError> {
        match parent_node(node) {
            Some(parent) => self.remove_child(&parent, node),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // 构造游离节点
    // ------------------------------------------------------------------

    /// 创建游离文本节点
    pub fn create_text(text: &str) -> Handle {
        Node::new(NodeData::Text {
            contents: RefCell::new(StrTendril::from_slice(text)),
        })
    }

    /// 将 HTML 片段解析为游离节点列表
    pub fn parse_fragment(html: &str) -> TranslatorResult<Vec<Handle>> {
        let fragment = Self::parse(html)?;
        let body = fragment
            .body()
            .ok_or_else(|| TranslatorError::ParseError("片段缺少 body".to_string()))?;

        let nodes: Vec<Handle> = body.children.borrow_mut().drain(..).collect();
        for node in &nodes {
            node.parent.set(None);
        }
        Ok(nodes)
    }

    // ------------------------------------------------------------------
    // 观察
    // ------------------------------------------------------------------

    /// 观察以 `target` 为根的子树，只接收注册之后发生的变更
    pub fn observe(&self, target: &Handle, observer: Rc<dyn MutationObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer_id.get());
        self.next_observer_id.set(id.0 + 1);

        self.registrations.borrow_mut().push(Registration {
            id,
            target: target.clone(),
            observer,
            queue: Vec::new(),
        });
        id
    }

    /// 取消观察并丢弃其未投递的记录
    pub fn disconnect(&self, id: ObserverId) -> bool {
        let mut registrations = self.registrations.borrow_mut();
        let before = registrations.len();
        registrations.retain(|registration| registration.id != id);
        registrations.len() != before
    }

    /// 取出某个观察者未投递的记录
    pub fn take_records(&self, id: ObserverId) -> Vec<MutationRecord> {
        self.registrations
            .borrow_mut()
            .iter_mut()
            .find(|registration| registration.id == id)
            .map(|registration| std::mem::take(&mut registration.queue))
            .unwrap_or_default()
    }

    pub fn observer_count(&self) -> usize {
        self.registrations.borrow().len()
    }

    /// 投递所有排队的变更记录，返回投递的记录数
    ///
    /// 回调中产生的新记录会在下一回合继续投递，直到队列清空或达到回合上限。
    pub fn deliver_mutations(&self) -> usize {
        let mut delivered = 0;

        for _ in 0..constants::MAX_DELIVERY_ROUNDS {
            let batches: Vec<(Rc<dyn MutationObserver>, Vec<MutationRecord>)> = self
                .registrations
                .borrow_mut()
                .iter_mut()
                .filter(|registration| !registration.queue.is_empty())
                .map(|registration| {
                    (
                        Rc::clone(&registration.observer),
                        std::mem::take(&mut registration.queue),
                    )
                })
                .collect();

            if batches.is_empty() {
                return delivered;
            }

            for (observer, records) in batches {
                delivered += records.len();
                observer.on_mutations(&records);
            }
        }

        tracing::warn!(
            "变更投递超过 {} 个回合，剩余记录留待下次投递",
            constants::MAX_DELIVERY_ROUNDS
        );
        delivered
    }

    fn queue_record(&self, record: MutationRecord) {
        for registration in self.registrations.borrow_mut().iter_mut() {
            if is_inclusive_ancestor(&registration.target, record.target()) {
                registration.queue.push(record.clone());
            }
        }
    }

    // ------------------------------------------------------------------
    // 序列化
    // ------------------------------------------------------------------

    /// 序列化文档
    pub fn to_html(&self) -> TranslatorResult<String> {
        let mut buf: Vec<u8> = Vec::new();
        let serializable: SerializableHandle = self.dom.document.clone().into();
        serialize(&mut buf, &serializable, SerializeOpts::default())?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
