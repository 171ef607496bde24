//! A small CMS installation on disk for integration tests

#![allow(dead_code)]

use extpack::Installation;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const COMPONENT_MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<extension type="component" version="4.0" method="upgrade">
    <name>COM_HELLO</name>
    <creationDate>2024-01-01</creationDate>
    <author>Hello Team</author>
    <authorEmail>team@example.com</authorEmail>
    <authorUrl>https://example.com</authorUrl>
    <copyright>(C) 2024 Hello Team</copyright>
    <license>GPL-2.0-or-later</license>
    <version>1.2.0</version>
    <description>COM_HELLO_XML_DESCRIPTION</description>
    <scriptfile>script.php</scriptfile>
    <install>
        <sql><file driver="mysql" charset="utf8">sql/install.mysql.utf8.sql</file></sql>
    </install>
    <uninstall>
        <sql><file driver="mysql" charset="utf8">sql/uninstall.mysql.utf8.sql</file></sql>
    </uninstall>
    <files folder="site">
        <filename>index.php</filename>
        <folder>views</folder>
    </files>
    <languages folder="site">
        <language tag="en-GB">language/en-GB/en-GB.com_hello.ini</language>
    </languages>
    <media destination="com_hello" folder="media">
        <folder>css</folder>
    </media>
    <administration>
        <menu>COM_HELLO_MENU</menu>
        <files folder="admin">
            <filename>hello.php</filename>
            <folder>sql</folder>
        </files>
        <languages folder="admin">
            <language tag="en-GB">language/en-GB/en-GB.com_hello.ini</language>
            <language tag="en-GB">language/en-GB/en-GB.com_hello.sys.ini</language>
        </languages>
    </administration>
</extension>
"#;

pub const MODULE_MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<extension type="module" client="site" method="upgrade">
    <name>MOD_GREETING</name>
    <author>Hello Team</author>
    <creationDate>2024-01-01</creationDate>
    <copyright>(C) 2024 Hello Team</copyright>
    <license>GPL-2.0-or-later</license>
    <authorEmail>team@example.com</authorEmail>
    <authorUrl>https://example.com</authorUrl>
    <version>0.3.0</version>
    <description>MOD_GREETING_XML_DESCRIPTION</description>
    <files>
        <filename module="mod_greeting">mod_greeting.php</filename>
        <folder>tmpl</folder>
    </files>
</extension>
"#;

pub fn package_manifest(files: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<extension type="package" method="upgrade">
    <name>Hello Suite</name>
    <packagename>suite</packagename>
    <author>Hello Team</author>
    <authorEmail>team@example.com</authorEmail>
    <authorUrl>https://example.com</authorUrl>
    <copyright>(C) 2024 Hello Team</copyright>
    <creationDate>2024-01-01</creationDate>
    <description>PKG_SUITE_XML_DESCRIPTION</description>
    <license>GPL-2.0-or-later</license>
    <version>2.0.0</version>
    <files>
{}
    </files>
</extension>
"#,
        files
    )
}

/// A web root with `com_hello` installed, plus an output folder
pub struct Site {
    pub temp_dir: TempDir,
}

impl Site {
    pub fn new() -> Self {
        let site = Self {
            temp_dir: TempDir::new().unwrap(),
        };
        fs::create_dir_all(site.output_dir()).unwrap();
        site
    }

    /// Site with the hello component fully installed
    pub fn with_component() -> Self {
        let site = Self::new();
        site.install_component(COMPONENT_MANIFEST);
        site
    }

    pub fn web_root(&self) -> PathBuf {
        self.temp_dir.path().join("www")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.temp_dir.path().join("dist")
    }

    pub fn root(&self) -> String {
        self.web_root().to_string_lossy().replace('\\', "/")
    }

    pub fn installation(&self) -> Installation {
        Installation::new("test site", self.root())
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.web_root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn path(&self, relative: &str) -> String {
        format!("{}/{}", self.root(), relative)
    }

    pub fn component_manifest(&self) -> String {
        self.path("administrator/components/com_hello/hello.xml")
    }

    pub fn install_component(&self, manifest: &str) {
        let admin = "administrator/components/com_hello";
        self.write(&format!("{}/hello.xml", admin), manifest);
        self.write(
            &format!("{}/hello.php", admin),
            "<?php\necho Text::_('COM_HELLO_ADMIN_TITLE');\n",
        );
        self.write(&format!("{}/script.php", admin), "<?php\nclass com_helloInstallerScript {}\n");
        self.write(
            &format!("{}/sql/install.mysql.utf8.sql", admin),
            "CREATE TABLE IF NOT EXISTS `#__hello_items` (\n  `id` INT NOT NULL\n);\n",
        );
        self.write(
            &format!("{}/sql/uninstall.mysql.utf8.sql", admin),
            "DROP TABLE IF EXISTS `#__hello_items`;\n",
        );

        self.write("components/com_hello/index.php", "<?php\necho Text::_('COM_HELLO_GREETING');\n");
        self.write(
            "components/com_hello/views/item/default.php",
            "<?php echo Text::_('COM_HELLO_ITEM'); ?>\n",
        );
        self.write(
            "components/com_hello/views/list/default.php",
            "<?php echo Text::_('COM_HELLO_LIST'); ?>\n",
        );
        self.write("components/com_hello/views/list/view.html.php", "<?php\n");

        self.write("media/com_hello/css/hello.css", "body { color: red; }\n");

        self.write(
            "language/en-GB/en-GB.com_hello.ini",
            "; site strings\nCOM_HELLO=\"Hello\"\nCOM_HELLO_GREETING=\"Hi\"\nCOM_HELLO_ITEM=\"Item\"\nCOM_HELLO_LIST=\"List\"\n",
        );
        self.write(
            "administrator/language/en-GB/en-GB.com_hello.ini",
            "COM_HELLO_ADMIN_TITLE=\"Hello admin\"\nCOM_HELLO_UNUSED=\"Nobody\"\n",
        );
        self.write(
            "administrator/language/en-GB/en-GB.com_hello.sys.ini",
            "COM_HELLO=\"Hello\"\nCOM_HELLO_XML_DESCRIPTION=\"A greeting\"\nCOM_HELLO_MENU=\"Hello\"\n",
        );
    }

    pub fn install_module(&self) {
        self.write("modules/mod_greeting/mod_greeting.xml", MODULE_MANIFEST);
        self.write("modules/mod_greeting/mod_greeting.php", "<?php\n");
        self.write("modules/mod_greeting/tmpl/default.php", "<?php\n");
    }

    pub fn archive_path(&self, name: &str) -> PathBuf {
        self.output_dir().join(format!("{}.zip", name))
    }
}

pub fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}
